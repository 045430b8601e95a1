pub mod icmp;
pub mod resolver;
pub mod sink;
