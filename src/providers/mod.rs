pub mod opnsense;
