use tui_textarea::Input;

use super::ResponderEvent;

pub enum Event {
    KeyboardCharInput(Input),
    KeyboardCTRLC(),
    KeyboardCTRLN(),
    KeyboardCTRLO(),
    KeyboardCTRLX(),
    KeyboardEnter(),
    KeyboardPaste(String),
    Responder(ResponderEvent),
    UIScrollDown(),
    UIScrollUp(),
    UIScrollPageDown(),
    UIScrollPageUp(),
    UISelectNext(),
    UISelectPrevious(),
    UITick(),
}
