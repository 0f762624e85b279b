//! The demo application's own configuration: an IO mode and a set of
//! services, each identified by a type and a name.
//!
//! ```text
//! io_mode = "async"
//!
//! service "http" "web_proxy" {
//!   listen_addr = "127.0.0.1:8080"
//! }
//! ```

use std::io::{self, Write};

use confdoc::{Body, BodyContent, Diagnostics, Schema};

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub service_type: String,
    pub name: String,
    pub listen_addr: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub io_mode: String,
    pub services: Vec<ServiceConfig>,
}

pub fn root_schema() -> Schema {
    Schema::new()
        .required_attribute("io_mode")
        .block("service", &["type", "name"])
}

fn service_schema() -> Schema {
    Schema::new().required_attribute("listen_addr")
}

/// Any literal is accepted where a string is expected.
fn string_attr(content: &BodyContent, name: &str) -> String {
    content
        .attributes
        .get(name)
        .map(|a| a.expr.value.to_string())
        .unwrap_or_default()
}

/// Decode `body` into a [`Config`], collecting every problem on the way.
pub fn decode(body: &dyn Body) -> (Config, Diagnostics) {
    let (content, mut diags) = body.content(&root_schema());
    let service_schema = service_schema();

    let mut config = Config {
        io_mode: string_attr(&content, "io_mode"),
        services: Vec::new(),
    };
    for block in content.blocks_of_type("service") {
        let (inner, more) = block.body.content(&service_schema);
        diags.extend(more);
        // the schema guarantees exactly two labels
        config.services.push(ServiceConfig {
            service_type: block.labels[0].clone(),
            name: block.labels[1].clone(),
            listen_addr: string_attr(&inner, "listen_addr"),
        });
    }

    (config, diags)
}

pub fn write_config(config: &Config, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "The IO mode is {:?}", config.io_mode)?;
    writeln!(out)?;
    for svc in &config.services {
        writeln!(out, "- Service {:?} {:?}:", svc.service_type, svc.name)?;
        writeln!(out, "  The listen address is {}", svc.listen_addr)?;
        writeln!(out)?;
    }
    Ok(())
}
