//! 回环演示
//!
//! 用 `ChannelTransport` 接一个进程内的假服务端：登录、并发发送消息、
//! 接收推送，最后用游标拉取器翻完服务端会话列表。

use chatsync_sdk::model::RemoteConversation;
use chatsync_sdk::{
    methods, AnyListener, ChannelTransport, ChatClient, ChatListener, ChatSyncConfig, Conversation,
    ConversationKey, EventCategory, Message, MessageDirection, OutboundRequest, PagedResource,
    TransportEvent,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::mpsc;

struct PrintingListener;

impl ChatListener for PrintingListener {
    fn on_messages_received(&self, messages: &[Message]) {
        for message in messages {
            println!("📨 收到 {} 的消息: {:?}", message.from, message.body);
        }
    }
}

/// 服务端一页会话列表
fn conversation_page(cursor: &str) -> Value {
    let (next, ids): (&str, &[&str]) = match cursor {
        "" => ("page-2", &["bob", "carol"]),
        "page-2" => ("", &["dave"]),
        _ => ("", &[]),
    };
    let list: Vec<RemoteConversation> = ids
        .iter()
        .map(|id| RemoteConversation {
            conversation: Conversation::new(&ConversationKey::direct(*id)),
            last_message: None,
        })
        .collect();
    json!({ "cursor": next, "list": list })
}

/// 把对方的回信包装成推送
fn echo_push(request: &OutboundRequest) -> Option<TransportEvent> {
    let to = request.params["to"].as_str()?;
    let mut reply = Message::create_text_send_message(to, "收到 👋");
    reply.from = to.to_string();
    reply.to = "alice".to_string();
    reply.direction = MessageDirection::Receive;
    reply.is_read = false;
    Some(TransportEvent::Push {
        category: EventCategory::Chat,
        event: "messages_received".into(),
        payload: json!([reply]),
    })
}

/// 假服务端：消费出站请求，把结果喂回客户端
async fn serve(client: ChatClient, mut outbound: mpsc::UnboundedReceiver<OutboundRequest>) {
    let mut server_seq = 0u64;
    while let Some(request) = outbound.recv().await {
        let payload = match request.method.as_str() {
            methods::SEND_MESSAGE => {
                server_seq += 1;
                json!({
                    "server_msg_id": format!("srv-{}", server_seq),
                    "server_time": chrono::Utc::now().timestamp_millis(),
                })
            }
            methods::FETCH_CONVERSATIONS => {
                conversation_page(request.params["cursor"].as_str().unwrap_or(""))
            }
            _ => Value::Null,
        };
        let response = TransportEvent::Response {
            correlation_id: request.correlation_id.clone(),
            payload,
        };
        if let Err(e) = client.handle_inbound(response) {
            tracing::warn!("inbound failed: {}", e);
        }
        if request.method == methods::SEND_MESSAGE {
            if let Some(push) = echo_push(&request) {
                let _ = client.handle_inbound(push);
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志
    chatsync_sdk::init_tracing(false);

    println!("========================================");
    println!("ChatSync 回环演示 (v{})", chatsync_sdk::SDK_VERSION);
    println!("========================================\n");

    let config = ChatSyncConfig::builder()
        .app_key("demo#loopback")
        .default_page_size(2)
        .build()?;
    let (transport, outbound) = ChannelTransport::new();
    let client = ChatClient::new(config, Arc::new(transport))?;
    client.add_listener(AnyListener::Chat(Arc::new(PrintingListener)));

    let server = tokio::spawn(serve(client.clone(), outbound));

    // === 1. 登录 ===
    client.login("alice", "demo-token").await?;
    println!("✅ 已登录: {:?}", client.current_user());

    // === 2. 并发发送 ===
    let chat = client.chat_manager();
    let sends = ["bob", "carol"]
        .iter()
        .map(|to| chat.send(Message::create_text_send_message(*to, "你好")));
    for result in futures::future::join_all(sends).await {
        let sent = result?;
        println!("📤 {} 已发送给 {} ({:?})", sent.msg_id, sent.to, sent.status);
    }
    println!("🔔 未读消息: {}", chat.unread_message_count());

    // === 3. 翻页拉取会话列表 ===
    let mut pager = client.default_pager(
        PagedResource::Conversations { pinned_only: false },
        "",
        chatsync_sdk::invoker::decode_json::<RemoteConversation>,
    )?;
    while let Some(page) = pager.next_page().await? {
        let ids: Vec<&str> = page.data.iter().map(|c| c.conversation.id.as_str()).collect();
        println!("📄 cursor='{}' {:?}", page.cursor, ids);
    }

    let stats = client.event_stats();
    println!("\n📊 推送事件 {} 个, 待决请求 {}", stats.total_events, client.pending_request_count());

    client.shutdown();
    server.abort();
    println!("\n✅ 演示完成");
    Ok(())
}
