use crate::sessions::SessionRouter;

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionRouter,
    pub webhook_secret: String,
}
