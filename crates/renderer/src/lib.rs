//! Image rendering for the yearly climate rasters.
//!
//! Every artifact of a band is drawn against the band's frozen
//! [`GlobalRange`](raster_common::GlobalRange):
//! - Colour-mapped transparent overlays (`gradient` + `png`)
//! - Static plots with a colour bar (`plot`)
//! - Standalone colour-bar legends (`colorbar`)
//! - Terrain views draped over the reference elevation (`terrain`)
//! - Looping GIFs of a band's yearly plots (`animation`)

pub mod animation;
pub mod colorbar;
pub mod colormap;
pub mod gradient;
pub mod plot;
pub mod png;
pub mod terrain;
pub mod text;

pub use animation::{animate_band, collect_frames, encode_gif, DEFAULT_FRAME_DELAY_MS};
pub use colorbar::{render_colorbar, write_colorbar, LEGEND_HEIGHT, LEGEND_WIDTH};
pub use colormap::{Color, Colormap};
pub use gradient::{colorize, RgbaRaster};
pub use plot::{render_plot, write_plot, PlotLayout, PlotRequest};
pub use png::{encode_raster, write_png};
pub use terrain::{render_terrain, write_terrain, TerrainRequest, TerrainView};
pub use text::Labeler;
