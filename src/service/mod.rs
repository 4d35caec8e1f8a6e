pub mod bantuan;
