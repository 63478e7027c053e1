//! Minimal class-file writer for end-to-end tests

#![allow(dead_code)]

use std::collections::HashMap;

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_SUPER: u16 = 0x0020;

/// One method: (access, name, descriptor, code bytes)
pub struct MethodSpec<'a> {
    pub access: u16,
    pub name: &'a str,
    pub descriptor: &'a str,
    pub code: Vec<u8>,
}

#[derive(Default)]
pub struct ClassWriter {
    pool: Vec<u8>,
    count: u16,
    utf8: HashMap<String, u16>,
    classes: HashMap<String, u16>,
    fields: Vec<u8>,
    field_count: u16,
    methods: Vec<u8>,
    method_count: u16,
}

impl ClassWriter {
    pub fn new() -> Self {
        Self {
            count: 1,
            ..Default::default()
        }
    }

    fn push(&mut self, bytes: &[u8]) -> u16 {
        self.pool.extend_from_slice(bytes);
        let index = self.count;
        self.count += 1;
        index
    }

    pub fn utf8(&mut self, s: &str) -> u16 {
        if let Some(&i) = self.utf8.get(s) {
            return i;
        }
        let mut bytes = vec![1u8];
        bytes.extend_from_slice(&(s.len() as u16).to_be_bytes());
        bytes.extend_from_slice(s.as_bytes());
        let i = self.push(&bytes);
        self.utf8.insert(s.to_string(), i);
        i
    }

    pub fn class(&mut self, internal_name: &str) -> u16 {
        if let Some(&i) = self.classes.get(internal_name) {
            return i;
        }
        let name = self.utf8(internal_name);
        let mut bytes = vec![7u8];
        bytes.extend_from_slice(&name.to_be_bytes());
        let i = self.push(&bytes);
        self.classes.insert(internal_name.to_string(), i);
        i
    }

    /// Methodref constant
    pub fn method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class = self.class(owner);
        let n = self.utf8(name);
        let d = self.utf8(descriptor);
        let mut nat = vec![12u8];
        nat.extend_from_slice(&n.to_be_bytes());
        nat.extend_from_slice(&d.to_be_bytes());
        let nat = self.push(&nat);
        let mut bytes = vec![10u8];
        bytes.extend_from_slice(&class.to_be_bytes());
        bytes.extend_from_slice(&nat.to_be_bytes());
        self.push(&bytes)
    }

    pub fn field(&mut self, name: &str, descriptor: &str) {
        let n = self.utf8(name);
        let d = self.utf8(descriptor);
        self.fields.extend_from_slice(&0x0002u16.to_be_bytes());
        self.fields.extend_from_slice(&n.to_be_bytes());
        self.fields.extend_from_slice(&d.to_be_bytes());
        self.fields.extend_from_slice(&0u16.to_be_bytes());
        self.field_count += 1;
    }

    pub fn method(&mut self, spec: MethodSpec<'_>) {
        let mut body = Vec::new();
        body.extend_from_slice(&2u16.to_be_bytes()); // max_stack
        body.extend_from_slice(&2u16.to_be_bytes()); // max_locals
        body.extend_from_slice(&(spec.code.len() as u32).to_be_bytes());
        body.extend_from_slice(&spec.code);
        body.extend_from_slice(&0u16.to_be_bytes()); // exception table
        body.extend_from_slice(&0u16.to_be_bytes()); // attributes
        self.method_with_code_body(spec.access, spec.name, spec.descriptor, &body);
    }

    /// Method whose `Code` attribute body is written verbatim
    pub fn method_with_code_body(&mut self, access: u16, name: &str, descriptor: &str, body: &[u8]) {
        let n = self.utf8(name);
        let d = self.utf8(descriptor);
        let code_name = self.utf8("Code");

        self.methods.extend_from_slice(&access.to_be_bytes());
        self.methods.extend_from_slice(&n.to_be_bytes());
        self.methods.extend_from_slice(&d.to_be_bytes());
        self.methods.extend_from_slice(&1u16.to_be_bytes());
        self.methods.extend_from_slice(&code_name.to_be_bytes());
        self.methods.extend_from_slice(&(body.len() as u32).to_be_bytes());
        self.methods.extend_from_slice(body);
        self.method_count += 1;
    }

    /// Serialize as a public class extending `java/lang/Object`
    pub fn finish(mut self, internal_name: &str) -> Vec<u8> {
        let this = self.class(internal_name);
        let sup = self.class("java/lang/Object");

        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&52u16.to_be_bytes());
        out.extend_from_slice(&self.count.to_be_bytes());
        out.extend_from_slice(&self.pool);
        out.extend_from_slice(&(ACC_PUBLIC | ACC_SUPER).to_be_bytes());
        out.extend_from_slice(&this.to_be_bytes());
        out.extend_from_slice(&sup.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes()); // interfaces
        out.extend_from_slice(&self.field_count.to_be_bytes());
        out.extend_from_slice(&self.fields);
        out.extend_from_slice(&self.method_count.to_be_bytes());
        out.extend_from_slice(&self.methods);
        out.extend_from_slice(&0u16.to_be_bytes()); // attributes
        out
    }
}
