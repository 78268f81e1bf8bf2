pub mod ops;

pub use ops::{repo_name_from_remote, GitOps, FETCH_ORIGIN_KEY};
