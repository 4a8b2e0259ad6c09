pub mod deconz;
