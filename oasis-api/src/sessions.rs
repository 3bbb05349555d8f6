use std::collections::HashMap;
use std::sync::Arc;

use oasis_booking::SessionState;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error};

use crate::gateway::{ChatUpdate, Gateway};

/// Routes each inbound update to a long-lived worker owned by that
/// requester. A worker processes one event to completion before taking
/// the next, so a requester's conversation state can never interleave;
/// different requesters run fully in parallel. Workers idle forever —
/// a session only ends by cancel, restart or completion, never timeout.
#[derive(Clone)]
pub struct SessionRouter {
    gateway: Arc<Gateway>,
    inboxes: Arc<Mutex<HashMap<String, mpsc::Sender<ChatUpdate>>>>,
}

impl SessionRouter {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self {
            gateway,
            inboxes: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn dispatch(&self, update: ChatUpdate) {
        let sender = {
            let mut inboxes = self.inboxes.lock().await;
            match inboxes.get(&update.requester_id) {
                Some(sender) => sender.clone(),
                None => {
                    debug!("Starting session worker for {}", update.requester_id);
                    let (sender, receiver) = mpsc::channel(32);
                    tokio::spawn(run_session(self.gateway.clone(), receiver));
                    inboxes.insert(update.requester_id.clone(), sender.clone());
                    sender
                }
            }
        };

        // Blocks only this caller when the requester's inbox is full,
        // preserving per-requester ordering.
        if sender.send(update).await.is_err() {
            error!("Session worker inbox closed");
        }
    }
}

async fn run_session(gateway: Arc<Gateway>, mut inbox: mpsc::Receiver<ChatUpdate>) {
    let mut state = SessionState::default();
    while let Some(update) = inbox.recv().await {
        gateway.apply(update, &mut state).await;
    }
}
