//! Tools for loading datacenter descriptions and configs from different file formats.

mod vmp_parser;
mod yaml_parser;
