pub mod artifact;
pub mod random_forest;
pub mod tree;

pub use artifact::{ARTIFACT_VERSION, ModelArtifact};
pub use random_forest::{RandomForest, RandomForestParameters};
pub use tree::{TreeNode, TreeParameters};
