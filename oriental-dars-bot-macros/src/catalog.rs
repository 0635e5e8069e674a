use crate::format;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// One node of the YAML catalog: either a format string or a namespace.
///
/// `BTreeMap` keeps codegen output deterministic across builds.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Node {
    Leaf(String),
    Namespace(BTreeMap<String, Node>),
}

pub fn generate_library_from_yaml(path: &(impl AsRef<Path> + ?Sized)) -> TokenStream {
    let path = path.as_ref();
    let reader = BufReader::new(
        File::open(path).unwrap_or_else(|e| panic!("cannot open {}: {}", path.display(), e)),
    );
    let root: Node = serde_yaml::from_reader(reader)
        .unwrap_or_else(|e| panic!("cannot parse {}: {}", path.display(), e));
    let mut path_segments = Vec::new();
    generate_namespace(&root, &mut path_segments)
}

fn struct_ident(path_segments: &[String]) -> proc_macro2::Ident {
    if path_segments.is_empty() {
        format_ident!("Strings")
    } else {
        format_ident!("Strings__{}", path_segments.join("__"))
    }
}

fn generate_namespace(node: &Node, path_segments: &mut Vec<String>) -> TokenStream {
    let children = match node {
        Node::Leaf(_) => return TokenStream::new(),
        Node::Namespace(children) => children,
    };

    let self_ident = struct_ident(path_segments);
    let mut fields = TokenStream::new();
    let mut field_inits = TokenStream::new();
    let mut methods = TokenStream::new();
    let mut nested = TokenStream::new();

    for (name, child) in children.iter() {
        check_name(name, path_segments);
        let name_ident = format_ident!("{}", name);
        match child {
            Node::Namespace(_) => {
                path_segments.push(name.clone());
                let child_ident = struct_ident(path_segments);
                nested.extend(generate_namespace(child, path_segments));
                path_segments.pop();
                fields.extend(quote! {
                    pub #name_ident: #child_ident,
                });
                field_inits.extend(quote! {
                    #name_ident: #child_ident::new(),
                });
            }
            Node::Leaf(source) => {
                let pieces = format::parse(source).unwrap_or_else(|e| {
                    panic!(
                        "invalid format string `{}.{}`: {:?}",
                        path_segments.join("."),
                        name,
                        e,
                    )
                });
                let (body, num_params) = format::generate(&pieces);
                let mut params = TokenStream::new();
                for i in 0..num_params {
                    let param_ident = format_ident!("param_{}", i + 1);
                    params.extend(quote! {
                        #param_ident: &(impl ::std::fmt::Display + ?::std::marker::Sized),
                    });
                }
                methods.extend(quote! {
                    pub fn #name_ident(&self, #params) -> crate::message::FormattedText {
                        #body
                    }
                });
            }
        }
    }

    quote! {
        #[allow(non_camel_case_types)]
        pub struct #self_ident {
            #fields
        }

        #[allow(dead_code)]
        impl #self_ident {
            pub const fn new() -> Self {
                Self {
                    #field_inits
                }
            }

            #methods
        }

        #nested
    }
}

fn check_name(name: &str, path_segments: &[String]) {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if !valid || name.contains("__") {
        panic!(
            "invalid catalog key `{}` under `{}`",
            name,
            path_segments.join("."),
        );
    }
}
