pub mod delay;
pub mod systick;
