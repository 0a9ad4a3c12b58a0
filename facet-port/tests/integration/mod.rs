
mod construct;
mod inclusion;
