pub mod assignment;
pub mod auto_accept;
pub mod machine;
pub mod sync;
pub mod transitions;
