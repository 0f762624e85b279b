/// An attribute a body may (or must) define.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSchema {
    pub name: String,
    pub required: bool,
}

/// A block type a body may contain, with the names of its positional labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeaderSchema {
    pub block_type: String,
    pub label_names: Vec<String>,
}

/// The shape a decoding operation expects a body to have.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    pub attributes: Vec<AttributeSchema>,
    pub blocks: Vec<BlockHeaderSchema>,
}

impl Schema {
    pub fn new() -> Self {
        Schema::default()
    }

    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.push(AttributeSchema {
            name: name.into(),
            required: false,
        });
        self
    }

    pub fn required_attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.push(AttributeSchema {
            name: name.into(),
            required: true,
        });
        self
    }

    pub fn block(mut self, block_type: impl Into<String>, label_names: &[&str]) -> Self {
        self.blocks.push(BlockHeaderSchema {
            block_type: block_type.into(),
            label_names: label_names.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn find_attribute(&self, name: &str) -> Option<&AttributeSchema> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn find_block(&self, block_type: &str) -> Option<&BlockHeaderSchema> {
        self.blocks.iter().find(|b| b.block_type == block_type)
    }

    /// True if `name` is either an attribute or a block type in this schema.
    pub fn has_name(&self, name: &str) -> bool {
        self.find_attribute(name).is_some() || self.find_block(name).is_some()
    }

    /// The same schema with every attribute optional.
    pub fn without_required(&self) -> Schema {
        Schema {
            attributes: self
                .attributes
                .iter()
                .map(|a| AttributeSchema {
                    name: a.name.clone(),
                    required: false,
                })
                .collect(),
            blocks: self.blocks.clone(),
        }
    }

    pub fn required_attributes(&self) -> impl Iterator<Item = &AttributeSchema> {
        self.attributes.iter().filter(|a| a.required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn without_required_keeps_names_and_blocks() {
        let schema = Schema::new()
            .required_attribute("io_mode")
            .attribute("debug")
            .block("service", &["type", "name"]);
        let relaxed = schema.without_required();

        assert_eq!(relaxed.attributes.len(), 2);
        assert!(relaxed.attributes.iter().all(|a| !a.required));
        assert_eq!(relaxed.blocks, schema.blocks);
        assert_eq!(schema.required_attributes().count(), 1);
    }

    #[test]
    fn has_name_covers_attributes_and_block_types() {
        let schema = Schema::new().attribute("foo").block("block", &[]);
        assert!(schema.has_name("foo"));
        assert!(schema.has_name("block"));
        assert!(!schema.has_name("Foo"));
    }
}
