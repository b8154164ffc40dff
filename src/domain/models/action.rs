use super::ChatRequest;

pub enum Action {
    ResponderRequest(ChatRequest),
}
