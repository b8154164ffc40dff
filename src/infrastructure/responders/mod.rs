pub mod catalogue;
pub mod simulator;
pub mod stream_client;

use crate::domain::models::ChatRequest;
use crate::domain::models::ResponderBox;

pub struct ResponderManager {}

impl ResponderManager {
    /// The API answers whenever the startup health check passed, otherwise
    /// the simulator does.
    pub fn get(request: &ChatRequest) -> ResponderBox {
        if request.backend_available {
            return Box::<stream_client::StreamClient>::default();
        }

        return Box::<simulator::ResponseSimulator>::default();
    }
}
