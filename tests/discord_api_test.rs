#[cfg(test)]
mod discord_api_tests {
    use mockito::Matcher;
    use serde_json::json;

    use ticketbot::bot::commands;
    use ticketbot::channels::{ChannelError, ChannelProvider, DiscordProvider, OutboundMessage};
    use ticketbot::tests::test_util;

    fn provider(server: &mockito::Server) -> DiscordProvider {
        DiscordProvider::with_base_url("test-token", "app-1", &server.url())
    }

    #[tokio::test]
    async fn requests_carry_the_bot_authorization_header() {
        test_util::setup();
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/users/@me")
            .match_header("authorization", "Bot test-token")
            .with_status(200)
            .with_body(r#"{"id": "42", "username": "suporte", "discriminator": "0", "bot": true}"#)
            .create_async()
            .await;

        let user = provider(&server).get_current_user().await.unwrap();
        assert_eq!(user.id, "42");
        assert_eq!(user.tag(), "suporte");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn interaction_callbacks_hit_the_callback_route() {
        test_util::setup();
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/interactions/i1/tok-abc/callback")
            .match_body(Matcher::PartialJson(json!({"type": 5})))
            .with_status(204)
            .create_async()
            .await;

        provider(&server)
            .create_interaction_response(
                "i1",
                "tok-abc",
                &ticketbot::channels::InteractionResponse::deferred(),
            )
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rate_limits_surface_the_retry_after_header() {
        test_util::setup();
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/channels/c1")
            .with_status(429)
            .with_header("retry-after", "7")
            .with_body(r#"{"message": "You are being rate limited."}"#)
            .create_async()
            .await;

        let err = provider(&server).get_channel("c1").await.unwrap_err();
        assert!(matches!(
            err,
            ChannelError::RateLimited {
                retry_after: Some(7)
            }
        ));
    }

    #[tokio::test]
    async fn api_failures_carry_status_and_body() {
        test_util::setup();
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/channels/missing")
            .with_status(404)
            .with_body(r#"{"message": "Unknown Channel", "code": 10003}"#)
            .create_async()
            .await;

        let err = provider(&server).get_channel("missing").await.unwrap_err();
        match err {
            ChannelError::ApiError { status, message } => {
                assert_eq!(status, 404);
                assert!(message.contains("Unknown Channel"));
            }
            other => panic!("expected ApiError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_dm_opens_the_channel_then_posts() {
        test_util::setup();
        let mut server = mockito::Server::new_async().await;
        let open = server
            .mock("POST", "/users/@me/channels")
            .match_body(Matcher::Json(json!({"recipient_id": "u1"})))
            .with_status(200)
            .with_body(r#"{"id": "dm1", "type": 1}"#)
            .create_async()
            .await;
        let post = server
            .mock("POST", "/channels/dm1/messages")
            .match_body(Matcher::PartialJson(json!({"content": "olá"})))
            .with_status(200)
            .with_body(
                r#"{"id": "m1", "content": "olá", "author": {"id": "42", "username": "suporte"}}"#,
            )
            .create_async()
            .await;

        provider(&server)
            .send_dm("u1", &OutboundMessage::text("olá"))
            .await
            .unwrap();
        open.assert_async().await;
        post.assert_async().await;
    }

    #[tokio::test]
    async fn message_paging_parameters_reach_the_query_string() {
        test_util::setup();
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/channels/c1/messages")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("limit".into(), "100".into()),
                Matcher::UrlEncoded("before".into(), "m50".into()),
            ]))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let page = provider(&server)
            .get_channel_messages("c1", 100, Some("m50"))
            .await
            .unwrap();
        assert!(page.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn command_registration_replaces_the_full_set() {
        test_util::setup();
        let mut server = mockito::Server::new_async().await;
        let definitions = commands::definitions();
        let mock = server
            .mock("PUT", "/applications/app-1/commands")
            .match_body(Matcher::Json(definitions.clone()))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        provider(&server).register_commands(&definitions).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn transcript_upload_is_sent_as_multipart() {
        test_util::setup();
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PATCH", "/webhooks/app-1/tok-abc/messages/@original")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/form-data".to_string()),
            )
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        provider(&server)
            .edit_original_response_with_file(
                "tok-abc",
                &OutboundMessage::text("📄 Aqui está a transcrição do seu ticket:"),
                "transcript_c1.txt",
                "conteúdo".as_bytes(),
            )
            .await
            .unwrap();
        mock.assert_async().await;
    }
}
