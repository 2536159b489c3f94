//! Presentation output
//!
//! Builds editable slide decks and writes them as `.pptx` packages.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pdf2deck::layout::LayoutMapper;
//! use pdf2deck::pptx::{PresentationAssembler, SlideGeometry};
//!
//! let layout = LayoutMapper::new(SlideGeometry::WIDESCREEN, None);
//! let mut assembler = PresentationAssembler::new(layout, true, 100);
//! assembler.add_cleaned(cleaned_page)?;
//! assembler.write("deck.pptx")?;
//! ```

mod assembler;
mod model;
mod parts;
mod writer;

pub use assembler::{encode_png, PresentationAssembler};
pub use model::{
    Picture, Presentation, Slide, SlideGeometry, TextFrame, TextStyle, EMU_PER_INCH, EMU_PER_POINT,
};
pub use writer::{to_bytes, write_presentation};
