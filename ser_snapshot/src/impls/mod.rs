mod other;
mod primitives;
mod ptrs;
