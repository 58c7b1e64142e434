mod joke;
pub use self::joke::*;
