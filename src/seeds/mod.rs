pub mod portal_seed;
