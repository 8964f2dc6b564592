mod session;

pub use session::AUTH_TOKEN_KEY;
pub use session::MemorySessionStore;
pub use session::SESSION_COOKIE;
pub use session::SessionStore;
pub use session::{session_cookie, session_from_headers};
