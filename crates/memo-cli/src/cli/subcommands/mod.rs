mod mappings;

pub use mappings::MappingsCommands;
