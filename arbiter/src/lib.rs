mod records;
mod room;
mod rooms;
mod socket;
pub use records::*;
pub use room::*;
pub use rooms::*;
pub use socket::*;
