pub mod goal;
pub mod loop_cmd;
pub mod score;
