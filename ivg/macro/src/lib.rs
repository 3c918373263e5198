//! Provides a macro for assembling IconVG graphics at compile time.
//!
//! # Examples
//!
//! ```
//! use ivg_macro::ivg_bytes;
//! static SQUARE: &[u8] = ivg_bytes!("-32 -32 32 32", "M-10 -10L10 -10L10 10L-10 10z");
//! println!("{}", SQUARE.len());
//! ```
extern crate proc_macro;

use quote::ToTokens;
use syn::{
    parse::{Parse, ParseStream},
    parse_macro_input,
    punctuated::Punctuated,
    LitByteStr, LitStr, Token,
};

use ivg_io::{Destination, Encoder, ViewBox, DEFAULT_PALETTE};
use ivg_svg::Generator;

struct IvgInput {
    view_box: LitStr,
    paths: Vec<LitStr>,
}

impl Parse for IvgInput {
    fn parse(input: ParseStream<'_>) -> syn::Result<Self> {
        let lits: Punctuated<LitStr, Token![,]> = Punctuated::parse_terminated(input)?;
        let mut iter = lits.into_iter();
        let view_box = match iter.next() {
            Some(lit) => lit,
            None => {
                return Err(input.error("expected a view box literal such as \"-32 -32 32 32\""));
            }
        };
        Ok(Self {
            view_box,
            paths: iter.collect(),
        })
    }
}

/// Assembles IconVG data (`&[u8]`) from a view box literal (four
/// space-separated coordinates) followed by one SVG path data string per
/// path. Every path is filled with `CREG[CSEL]`.
#[proc_macro]
pub fn ivg_bytes(params: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input: IvgInput = parse_macro_input!(params);

    let coords: Result<Vec<f32>, _> = input
        .view_box
        .value()
        .split_whitespace()
        .map(str::parse)
        .collect();
    let view_box = match coords.as_ref().map(Vec::as_slice) {
        Ok(&[min_x, min_y, max_x, max_y]) => ViewBox::new(min_x, min_y, max_x, max_y),
        _ => {
            return syn::Error::new_spanned(
                &input.view_box,
                "must be four space-separated coordinates",
            )
            .to_compile_error()
            .into();
        }
    };
    if !view_box.is_valid() {
        return syn::Error::new_spanned(&input.view_box, "view box is not min <= max and finite")
            .to_compile_error()
            .into();
    }

    let mut encoder = Encoder::new();
    encoder.reset(view_box, &DEFAULT_PALETTE);
    let mut generator = Generator::new(encoder);
    for path in &input.paths {
        if let Err(e) = generator.set_path_data(&path.value(), 0) {
            return syn::Error::new_spanned(path, format!("bad path data: {}", e))
                .to_compile_error()
                .into();
        }
    }

    let bytes = match generator.into_inner().bytes() {
        Ok(bytes) => bytes,
        Err(e) => {
            return syn::Error::new_spanned(&input.view_box, format!("could not encode: {}", e))
                .to_compile_error()
                .into();
        }
    };

    LitByteStr::new(&bytes, input.view_box.span())
        .into_token_stream()
        .into()
}
