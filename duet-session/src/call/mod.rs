mod call_command;
mod call_handle;
mod call_observer;
mod call_session;
mod call_state;

pub use call_command::CallCommand;
pub use call_handle::CallHandle;
pub use call_observer::CallObserver;
pub use call_session::CallSession;
pub use call_state::CallState;
