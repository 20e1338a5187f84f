use super::send::text_body;
use super::*;

fn config() -> CloudConfig {
    CloudConfig {
        enabled: true,
        token: "EAAG-test".into(),
        phone_number_id: "1098765".into(),
        verify_token: "segredo".into(),
        ..Default::default()
    }
}

fn payload(json: &str) -> WebhookPayload {
    serde_json::from_str(json).unwrap()
}

const TEXT_EVENT: &str = r#"{
  "object": "whatsapp_business_account",
  "entry": [{
    "id": "102290129340398",
    "changes": [{
      "field": "messages",
      "value": {
        "messaging_product": "whatsapp",
        "metadata": {"display_phone_number": "15550783881", "phone_number_id": "1098765"},
        "contacts": [{"profile": {"name": "Ana Souza"}, "wa_id": "5511999887766"}],
        "messages": [{
          "from": "5511999887766",
          "id": "wamid.HBgLMTY0NjcwNDM1OTUVAgASGBQzQTRBNjU5OUFFRTAzODEwMTQ0RgA=",
          "timestamp": "1718000000",
          "type": "text",
          "text": {"body": "/bot qual a capital da Bahia?"}
        }]
      }
    }]
  }]
}"#;

const STATUS_EVENT: &str = r#"{
  "object": "whatsapp_business_account",
  "entry": [{"changes": [{"field": "messages", "value": {
    "statuses": [{"id": "wamid.x", "status": "delivered", "recipient_id": "5511999887766"}]
  }}]}]
}"#;

#[test]
fn test_extract_text_message() {
    let messages = extract_messages(payload(TEXT_EVENT));
    assert_eq!(messages.len(), 1);
    let msg = &messages[0];
    assert_eq!(msg.channel, "cloud");
    assert_eq!(msg.chat_id, "5511999887766");
    assert_eq!(msg.sender_id, "5511999887766");
    assert_eq!(msg.sender_name.as_deref(), Some("Ana Souza"));
    assert_eq!(msg.text, "/bot qual a capital da Bahia?");
    assert!(!msg.is_group);
    assert_eq!(msg.timestamp.timestamp(), 1_718_000_000);
}

#[test]
fn test_extract_skips_status_and_media() {
    assert!(extract_messages(payload(STATUS_EVENT)).is_empty());

    let image = r#"{"entry":[{"changes":[{"value":{"messages":[
        {"from":"5511","type":"image","image":{"id":"media-1"}}
    ]}}]}]}"#;
    assert!(extract_messages(payload(image)).is_empty());
    assert!(extract_messages(WebhookPayload::default()).is_empty());
}

#[test]
fn test_extract_bad_timestamp_keeps_receive_time() {
    let json = r#"{"entry":[{"changes":[{"value":{"messages":[
        {"from":"5511","timestamp":"soon","type":"text","text":{"body":"oi"}}
    ]}}]}]}"#;
    let messages = extract_messages(payload(json));
    assert_eq!(messages.len(), 1);
    assert!(messages[0].sender_name.is_none());
    assert!((Utc::now() - messages[0].timestamp).num_seconds() < 5);
}

#[test]
fn test_messages_url() {
    let channel = CloudChannel::new(config());
    assert_eq!(
        channel.messages_url(),
        "https://graph.facebook.com/v18.0/1098765/messages"
    );
}

#[test]
fn test_text_body_shape() {
    let body = text_body("5511", "olá");
    assert_eq!(body["messaging_product"], "whatsapp");
    assert_eq!(body["to"], "5511");
    assert_eq!(body["type"], "text");
    assert_eq!(body["text"]["body"], "olá");
}

#[test]
fn test_verify_subscription() {
    let channel = CloudChannel::new(config());
    assert!(channel.verify_subscription(Some("subscribe"), Some("segredo")));
    assert!(!channel.verify_subscription(Some("subscribe"), Some("errado")));
    assert!(!channel.verify_subscription(Some("unsubscribe"), Some("segredo")));
    assert!(!channel.verify_subscription(None, None));

    let open = CloudChannel::new(CloudConfig {
        verify_token: String::new(),
        ..config()
    });
    assert!(!open.verify_subscription(Some("subscribe"), Some("")));
}

#[tokio::test]
async fn test_ingest_before_start_drops() {
    let channel = CloudChannel::new(config());
    assert_eq!(channel.ingest(payload(TEXT_EVENT)).await, 0);
}

#[tokio::test]
async fn test_ingest_after_start_delivers() {
    let channel = CloudChannel::new(config());
    let mut rx = channel.start().await.unwrap();

    assert_eq!(channel.ingest(payload(TEXT_EVENT)).await, 1);
    let msg = rx.recv().await.unwrap();
    assert_eq!(msg.text, "/bot qual a capital da Bahia?");

    channel.stop().await.unwrap();
    assert_eq!(channel.ingest(payload(TEXT_EVENT)).await, 0);
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_start_requires_credentials() {
    let channel = CloudChannel::new(CloudConfig::default());
    assert!(channel.start().await.is_err());
}

#[tokio::test]
async fn test_send_requires_reply_target() {
    let channel = CloudChannel::new(config());
    let err = channel
        .send(OutgoingMessage {
            text: "oi".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ZapError::Channel(_)));
}
