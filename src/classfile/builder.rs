//! Class-file writer for tests
//!
//! Produces real class-file bytes so the extractor and walker can be tested
//! against the binary format rather than hand-assembled models.

use std::collections::HashMap;

/// Annotation element value
pub enum Element {
    Str(&'static str),
    Int(i32),
    Bool(bool),
    /// (type descriptor, constant name)
    Enum(&'static str, &'static str),
}

pub struct ClassFileBuilder {
    pool: Vec<u8>,
    next_index: u16,
    utf8_cache: HashMap<String, u16>,
    class_cache: HashMap<String, u16>,
    access: u16,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<Vec<u8>>,
    methods: Vec<Vec<u8>>,
    visible: Vec<Vec<u8>>,
    invisible: Vec<Vec<u8>>,
    source_file: Option<u16>,
    deprecated: bool,
}

impl ClassFileBuilder {
    /// A public class extending `java/lang/Object`
    pub fn new(internal_name: &str) -> Self {
        let mut b = Self {
            pool: Vec::new(),
            next_index: 1,
            utf8_cache: HashMap::new(),
            class_cache: HashMap::new(),
            access: 0x0021,
            this_class: 0,
            super_class: 0,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            visible: Vec::new(),
            invisible: Vec::new(),
            source_file: None,
            deprecated: false,
        };
        b.this_class = b.class(internal_name);
        b.super_class = b.class("java/lang/Object");
        b
    }

    fn push_constant(&mut self, bytes: &[u8]) -> u16 {
        self.pool.extend_from_slice(bytes);
        let index = self.next_index;
        self.next_index += 1;
        index
    }

    pub fn utf8(&mut self, s: &str) -> u16 {
        if let Some(&i) = self.utf8_cache.get(s) {
            return i;
        }
        let mut bytes = vec![1];
        bytes.extend_from_slice(&(s.len() as u16).to_be_bytes());
        bytes.extend_from_slice(s.as_bytes());
        let i = self.push_constant(&bytes);
        self.utf8_cache.insert(s.to_string(), i);
        i
    }

    pub fn class(&mut self, internal_name: &str) -> u16 {
        if let Some(&i) = self.class_cache.get(internal_name) {
            return i;
        }
        let name = self.utf8(internal_name);
        let mut bytes = vec![7];
        bytes.extend_from_slice(&name.to_be_bytes());
        let i = self.push_constant(&bytes);
        self.class_cache.insert(internal_name.to_string(), i);
        i
    }

    pub fn integer(&mut self, v: i32) -> u16 {
        let mut bytes = vec![3];
        bytes.extend_from_slice(&v.to_be_bytes());
        self.push_constant(&bytes)
    }

    fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let n = self.utf8(name);
        let d = self.utf8(descriptor);
        let mut bytes = vec![12];
        bytes.extend_from_slice(&n.to_be_bytes());
        bytes.extend_from_slice(&d.to_be_bytes());
        self.push_constant(&bytes)
    }

    fn member_ref(&mut self, tag: u8, owner: &str, name: &str, descriptor: &str) -> u16 {
        let c = self.class(owner);
        let nat = self.name_and_type(name, descriptor);
        let mut bytes = vec![tag];
        bytes.extend_from_slice(&c.to_be_bytes());
        bytes.extend_from_slice(&nat.to_be_bytes());
        self.push_constant(&bytes)
    }

    pub fn field_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        self.member_ref(9, owner, name, descriptor)
    }

    pub fn method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        self.member_ref(10, owner, name, descriptor)
    }

    pub fn access(&mut self, flags: u16) {
        self.access = flags;
    }

    pub fn no_superclass(&mut self) {
        self.super_class = 0;
    }

    pub fn superclass(&mut self, internal_name: &str) {
        self.super_class = self.class(internal_name);
    }

    pub fn interface(&mut self, internal_name: &str) {
        let i = self.class(internal_name);
        self.interfaces.push(i);
    }

    pub fn source_file(&mut self, name: &str) {
        self.source_file = Some(self.utf8(name));
    }

    pub fn deprecated_type(&mut self) {
        self.deprecated = true;
    }

    pub fn annotate_type(&mut self, descriptor: &str, elements: &[(&str, Element)], visible: bool) {
        let annotation = self.annotation(descriptor, elements);
        if visible {
            self.visible.push(annotation);
        } else {
            self.invisible.push(annotation);
        }
    }

    /// Field with runtime-visible marker annotations (no elements)
    pub fn field(&mut self, access: u16, name: &str, descriptor: &str, annotations: &[&str]) {
        let mut out = self.member_header(access, name, descriptor);
        if annotations.is_empty() {
            out.extend_from_slice(&0u16.to_be_bytes());
        } else {
            let tags: Vec<Vec<u8>> = annotations.iter().map(|d| self.annotation(d, &[])).collect();
            let attr = self.annotations_attribute("RuntimeVisibleAnnotations", &tags);
            out.extend_from_slice(&1u16.to_be_bytes());
            out.extend_from_slice(&attr);
        }
        self.fields.push(out);
    }

    /// Method with an optional body and exception table
    /// (`start_pc`, `end_pc`, `handler_pc`, `catch_type`)
    pub fn method(
        &mut self,
        access: u16,
        name: &str,
        descriptor: &str,
        code: Option<Vec<u8>>,
        handlers: &[(u16, u16, u16, u16)],
    ) {
        let mut out = self.member_header(access, name, descriptor);
        match code {
            None => out.extend_from_slice(&0u16.to_be_bytes()),
            Some(code) => {
                let mut body = Vec::new();
                body.extend_from_slice(&4u16.to_be_bytes()); // max_stack
                body.extend_from_slice(&4u16.to_be_bytes()); // max_locals
                body.extend_from_slice(&(code.len() as u32).to_be_bytes());
                body.extend_from_slice(&code);
                body.extend_from_slice(&(handlers.len() as u16).to_be_bytes());
                for &(start, end, handler, catch) in handlers {
                    for v in [start, end, handler, catch] {
                        body.extend_from_slice(&v.to_be_bytes());
                    }
                }
                body.extend_from_slice(&0u16.to_be_bytes()); // nested attributes
                out.extend_from_slice(&1u16.to_be_bytes());
                out.extend_from_slice(&self.attribute("Code", &body));
            }
        }
        self.methods.push(out);
    }

    fn member_header(&mut self, access: u16, name: &str, descriptor: &str) -> Vec<u8> {
        let n = self.utf8(name);
        let d = self.utf8(descriptor);
        let mut out = Vec::new();
        out.extend_from_slice(&access.to_be_bytes());
        out.extend_from_slice(&n.to_be_bytes());
        out.extend_from_slice(&d.to_be_bytes());
        out
    }

    fn annotation(&mut self, descriptor: &str, elements: &[(&str, Element)]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.utf8(descriptor).to_be_bytes());
        out.extend_from_slice(&(elements.len() as u16).to_be_bytes());
        for (key, value) in elements {
            out.extend_from_slice(&self.utf8(key).to_be_bytes());
            match value {
                Element::Str(s) => {
                    out.push(b's');
                    out.extend_from_slice(&self.utf8(s).to_be_bytes());
                }
                Element::Int(v) => {
                    out.push(b'I');
                    out.extend_from_slice(&self.integer(*v).to_be_bytes());
                }
                Element::Bool(v) => {
                    out.push(b'Z');
                    out.extend_from_slice(&self.integer(*v as i32).to_be_bytes());
                }
                Element::Enum(type_descriptor, constant) => {
                    out.push(b'e');
                    out.extend_from_slice(&self.utf8(type_descriptor).to_be_bytes());
                    out.extend_from_slice(&self.utf8(constant).to_be_bytes());
                }
            }
        }
        out
    }

    fn annotations_attribute(&mut self, name: &str, annotations: &[Vec<u8>]) -> Vec<u8> {
        let mut body = (annotations.len() as u16).to_be_bytes().to_vec();
        for a in annotations {
            body.extend_from_slice(a);
        }
        self.attribute(name, &body)
    }

    fn attribute(&mut self, name: &str, body: &[u8]) -> Vec<u8> {
        let mut out = self.utf8(name).to_be_bytes().to_vec();
        out.extend_from_slice(&(body.len() as u32).to_be_bytes());
        out.extend_from_slice(body);
        out
    }

    pub fn build(mut self) -> Vec<u8> {
        let mut attributes = Vec::new();
        if let Some(sf) = self.source_file {
            attributes.push(self.attribute("SourceFile", &sf.to_be_bytes()));
        }
        let visible = std::mem::take(&mut self.visible);
        if !visible.is_empty() {
            attributes.push(self.annotations_attribute("RuntimeVisibleAnnotations", &visible));
        }
        let invisible = std::mem::take(&mut self.invisible);
        if !invisible.is_empty() {
            attributes.push(self.annotations_attribute("RuntimeInvisibleAnnotations", &invisible));
        }
        if self.deprecated {
            attributes.push(self.attribute("Deprecated", &[]));
        }

        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&52u16.to_be_bytes());
        out.extend_from_slice(&self.next_index.to_be_bytes());
        out.extend_from_slice(&self.pool);
        out.extend_from_slice(&self.access.to_be_bytes());
        out.extend_from_slice(&self.this_class.to_be_bytes());
        out.extend_from_slice(&self.super_class.to_be_bytes());
        out.extend_from_slice(&(self.interfaces.len() as u16).to_be_bytes());
        for i in &self.interfaces {
            out.extend_from_slice(&i.to_be_bytes());
        }
        for members in [&self.fields, &self.methods] {
            out.extend_from_slice(&(members.len() as u16).to_be_bytes());
            for m in members.iter() {
                out.extend_from_slice(m);
            }
        }
        out.extend_from_slice(&(attributes.len() as u16).to_be_bytes());
        for a in &attributes {
            out.extend_from_slice(a);
        }
        out
    }
}
