pub mod agent_factory;
