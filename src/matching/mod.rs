pub mod assembler;
pub mod blocking;
pub mod comparator;
pub mod normalize;
pub mod resolver;
pub mod selector;
pub mod state_codes;
