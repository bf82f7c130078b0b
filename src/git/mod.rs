pub mod blame;
pub mod repo;

pub use blame::{parse_line_porcelain, BlameLine};
pub use repo::{GitRepo, TrackedFile};
