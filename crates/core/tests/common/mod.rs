use std::fs::File;
use std::io::Write;
use std::path::Path;

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_SUPER: u16 = 0x0020;
pub const ACC_VARARGS: u16 = 0x0080;
pub const ACC_INTERFACE: u16 = 0x0200;
pub const ACC_ABSTRACT: u16 = 0x0400;

/// A member to put in a fabricated class: (access flags, name, descriptor).
pub type Member<'a> = (u16, &'a str, &'a str);

struct Pool {
    bytes: Vec<u8>,
    count: u16,
}

impl Pool {
    fn utf8(&mut self, value: &str) -> u16 {
        self.bytes.push(1);
        self.bytes.extend_from_slice(&(value.len() as u16).to_be_bytes());
        self.bytes.extend_from_slice(value.as_bytes());
        self.count += 1;
        self.count
    }

    fn class(&mut self, internal_name: &str) -> u16 {
        let name = self.utf8(internal_name);
        self.bytes.push(7);
        self.bytes.extend_from_slice(&name.to_be_bytes());
        self.count += 1;
        self.count
    }
}

/// Assemble a minimal, parseable class file. Methods carry no code.
#[allow(dead_code)]
pub fn class_bytes(internal_name: &str, access: u16, fields: &[Member], methods: &[Member]) -> Vec<u8> {
    let mut pool = Pool {
        bytes: Vec::new(),
        count: 0,
    };
    let this_class = pool.class(internal_name);
    let super_class = pool.class("java/lang/Object");

    let mut members = |items: &[Member]| {
        let mut out = Vec::new();
        out.extend_from_slice(&(items.len() as u16).to_be_bytes());
        for (flags, name, descriptor) in items {
            let name_index = pool.utf8(name);
            let descriptor_index = pool.utf8(descriptor);
            out.extend_from_slice(&flags.to_be_bytes());
            out.extend_from_slice(&name_index.to_be_bytes());
            out.extend_from_slice(&descriptor_index.to_be_bytes());
            out.extend_from_slice(&0u16.to_be_bytes());
        }
        out
    };
    let field_bytes = members(fields);
    let method_bytes = members(methods);

    let mut out = Vec::new();
    out.extend_from_slice(&[0xCA, 0xFE, 0xBA, 0xBE]);
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&52u16.to_be_bytes());
    out.extend_from_slice(&(pool.count + 1).to_be_bytes());
    out.extend_from_slice(&pool.bytes);
    out.extend_from_slice(&(access | ACC_SUPER).to_be_bytes());
    out.extend_from_slice(&this_class.to_be_bytes());
    out.extend_from_slice(&super_class.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&field_bytes);
    out.extend_from_slice(&method_bytes);
    out.extend_from_slice(&0u16.to_be_bytes());
    out
}

#[allow(dead_code)]
pub fn write_jar(path: &Path, entries: &[(&str, Vec<u8>)]) {
    let file = File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    for (name, bytes) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(bytes).unwrap();
    }
    zip.finish().unwrap();
}
