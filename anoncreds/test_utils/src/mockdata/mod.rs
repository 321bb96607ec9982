pub mod mock_anoncreds;
