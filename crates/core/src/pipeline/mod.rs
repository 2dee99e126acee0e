pub mod mosaic_batch_use_case;
