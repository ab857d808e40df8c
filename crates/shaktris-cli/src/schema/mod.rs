pub mod record;
pub mod script;
