pub mod string_or_native;
pub mod string_or_native_sequence;
