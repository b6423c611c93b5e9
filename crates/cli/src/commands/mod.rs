pub mod inspect;
pub mod tail;
