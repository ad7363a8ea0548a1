pub mod d400_device_status;
