pub mod clip;
pub mod renamer;
pub mod scanner;
pub mod tagger;
pub mod template;
