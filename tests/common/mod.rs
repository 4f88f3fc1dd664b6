pub mod mock_client;
