use std::{collections::HashMap, io::Write};

use anyhow::Result;

use crate::{
    domain::{
        events::ShellCommand,
        ids::{MessageId, UserId},
        message::DeliveryStatus,
        session_state::{ChatSessionState, SessionPhase},
    },
    usecases::{
        chat_session::ChatSession,
        contracts::{CommandSource, ConversationRepository, RealtimeChannel},
        send_message::SendMessageError,
    },
};

use super::view;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    Quit,
}

/// Drives one chat session from `commands` until the input ends or the
/// user quits, printing state changes to `out`. The session is closed on
/// return.
pub async fn run<R, T, W>(
    session: &mut ChatSession<R, T>,
    commands: &mut dyn CommandSource,
    out: &mut W,
) -> Result<()>
where
    R: ConversationRepository,
    T: RealtimeChannel,
    W: Write,
{
    tracing::info!(
        conversation_id = %session.conversation_id(),
        "starting chat shell"
    );

    let mut renderer = Renderer::new(session.self_id().clone());
    session.mount().await;
    renderer.render(session.state_mut(), out)?;

    loop {
        let step = tokio::select! {
            command = commands.next_command() => match command? {
                Some(command) => apply_command(session, command, out).await?,
                None => Step::Quit,
            },
            Some(event) = session.next_event() => {
                session.handle_event(event).await;
                Step::Continue
            }
        };

        session.drain_pending().await;
        renderer.render(session.state_mut(), out)?;

        if step == Step::Quit {
            break;
        }
    }

    session.close();
    renderer.render(session.state_mut(), out)?;
    Ok(())
}

async fn apply_command<R, T, W>(
    session: &mut ChatSession<R, T>,
    command: ShellCommand,
    out: &mut W,
) -> Result<Step>
where
    R: ConversationRepository,
    T: RealtimeChannel,
    W: Write,
{
    match command {
        ShellCommand::Send(text) => {
            session.set_draft(&text);
            match session.submit().await {
                Ok(_) | Err(SendMessageError::EmptyMessage) => {}
                Err(SendMessageError::SessionNotActive) => {
                    writeln!(out, "Not connected to the conversation yet; text kept as draft.")?;
                }
                Err(error) => {
                    tracing::debug!(error = %error, "send from shell failed");
                }
            }
        }
        ShellCommand::Draft(text) => session.set_draft(&text),
        ShellCommand::Focus => session.on_focus().await,
        ShellCommand::Retry => {
            if !session.retry_load().await {
                writeln!(out, "Nothing to retry.")?;
            }
        }
        ShellCommand::Quit => return Ok(Step::Quit),
    }

    Ok(Step::Continue)
}

/// Prints only what changed since the previous render.
#[derive(Debug)]
struct Renderer {
    self_id: UserId,
    header: Option<String>,
    phase: Option<SessionPhase>,
    rendered: HashMap<MessageId, DeliveryStatus>,
    typing: Option<String>,
}

impl Renderer {
    fn new(self_id: UserId) -> Self {
        Self {
            self_id,
            header: None,
            phase: None,
            rendered: HashMap::new(),
            typing: None,
        }
    }

    fn render<W: Write>(&mut self, state: &mut ChatSessionState, out: &mut W) -> Result<()> {
        self.render_header(state, out)?;

        // The terminal always shows the newest line last.
        let _ = state.take_scroll_to_end();

        let partner = view::partner_name(state);
        for message in state.timeline().messages() {
            let previous = self.rendered.insert(message.id.clone(), message.status);
            let own = message.is_from(&self.self_id);
            let status_changed = previous.is_some_and(|status| status != message.status);

            if previous.is_none() || (own && status_changed) {
                writeln!(out, "{}", view::message_line(message, &self.self_id, partner))?;
            }
        }

        while let Some(alert) = state.take_alert() {
            writeln!(out, "{}", view::alert_line(&alert))?;
        }

        let typing = view::typing_line(state);
        if typing != self.typing {
            if let Some(line) = &typing {
                writeln!(out, "{line}")?;
            }
            self.typing = typing;
        }

        out.flush()?;
        Ok(())
    }

    fn render_header<W: Write>(&mut self, state: &ChatSessionState, out: &mut W) -> Result<()> {
        let header = view::header_line(state);
        if self.header.as_ref() != Some(&header) {
            writeln!(out, "{header}")?;
            self.header = Some(header);
        }

        let phase = state.phase();
        if self.phase != Some(phase) {
            if let Some(line) = view::phase_line(phase) {
                writeln!(out, "{line}")?;
            }
            self.phase = Some(phase);
        }

        Ok(())
    }
}
