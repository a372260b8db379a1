use std::path::Path;

use crate::{
    api::HttpConversationRepository,
    domain::ids::{ConversationId, UserId},
    infra::{self, error::AppError},
    transport::websocket::WebSocketTransport,
    usecases::{chat_session::ChatSession, context::AppContext},
};

pub type LiveChatSession = ChatSession<HttpConversationRepository, WebSocketTransport>;

pub fn bootstrap(config_path: Option<&Path>) -> Result<AppContext, AppError> {
    let context = build_context(config_path)?;
    infra::logging::init(&context.config.logging)?;

    Ok(context)
}

pub fn build_context(config_path: Option<&Path>) -> Result<AppContext, AppError> {
    let config = infra::config::load(config_path)?;

    Ok(AppContext::new(config))
}

/// Connects the realtime transport and builds an unmounted session for
/// `conversation_id`.
pub async fn open_session(
    context: &AppContext,
    conversation_id: ConversationId,
) -> Result<LiveChatSession, AppError> {
    let self_id = self_id(context)?;
    let server = &context.config.server;
    let auth_token = context.config.identity.auth_token.clone();

    let repository = HttpConversationRepository::new(
        &server.api_base_url,
        auth_token.clone(),
        server.request_timeout(),
    )?;
    let transport =
        WebSocketTransport::connect(&server.websocket_url, auth_token.as_deref()).await?;

    Ok(ChatSession::new(
        conversation_id,
        self_id,
        repository,
        transport,
        context.config.session.to_session_config(),
    ))
}

fn self_id(context: &AppContext) -> Result<UserId, AppError> {
    context
        .config
        .identity
        .user_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .map(UserId::new)
        .ok_or(AppError::MissingIdentity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_context_with_default_config_when_file_is_missing() {
        let context = build_context(Some(Path::new("./missing-config.toml")))
            .expect("context should build from defaults");

        assert_eq!(context.config, crate::infra::config::AppConfig::default());
    }

    #[tokio::test]
    async fn opening_a_session_requires_an_identity() {
        let context = build_context(Some(Path::new("./missing-config.toml")))
            .expect("context should build from defaults");

        let result = open_session(&context, ConversationId::new("c-1")).await;

        assert!(matches!(result, Err(AppError::MissingIdentity)));
    }

    #[test]
    fn blank_user_id_is_rejected() {
        let mut context = build_context(Some(Path::new("./missing-config.toml")))
            .expect("context should build from defaults");
        context.config.identity.user_id = Some("  ".to_owned());

        assert!(matches!(self_id(&context), Err(AppError::MissingIdentity)));
    }
}
