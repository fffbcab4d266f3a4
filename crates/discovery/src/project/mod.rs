pub mod io;
pub mod source;
