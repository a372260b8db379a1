use anyhow::{Context, Result};

use crate::{
    api,
    cli::{Cli, Command},
    domain::{self, ids::ConversationId},
    infra, transport, ui,
    usecases::{self, bootstrap},
};

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Chat { conversation } => {
            let context = bootstrap::bootstrap(cli.config.as_deref())?;
            log_module_boundaries();

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("failed to start async runtime")?;

            runtime.block_on(run_chat(&context, ConversationId::new(conversation)))
        }
        Command::Config => {
            let context = bootstrap::build_context(cli.config.as_deref())?;
            print!("{}", render_config(&context.config)?);
            Ok(())
        }
    }
}

async fn run_chat(
    context: &usecases::context::AppContext,
    conversation_id: ConversationId,
) -> Result<()> {
    let mut session = bootstrap::open_session(context, conversation_id).await?;
    let mut commands = ui::StdinCommandSource::new();
    let mut stdout = std::io::stdout();

    ui::shell::run(&mut session, &mut commands, &mut stdout).await
}

fn render_config(config: &infra::config::AppConfig) -> Result<String> {
    toml::to_string_pretty(&config.redacted()).context("failed to render config")
}

fn log_module_boundaries() {
    tracing::debug!(
        ui = ui::module_name(),
        domain = domain::module_name(),
        api = api::module_name(),
        transport = transport::module_name(),
        usecases = usecases::module_name(),
        infra = infra::module_name(),
        "module boundaries loaded"
    );
}
