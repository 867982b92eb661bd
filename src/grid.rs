//! Read-only access to the 2D/3D intensity samples that box counting runs over.
//!
//! A grid is borrowed for the duration of an estimation run and never mutated.
//! Grey images of the `image` crate are 2D grids of depth 1, an [`ImageStack`]
//! is a 3D grid and [`VolumeGrid`] holds arbitrary owned samples.

use std::ops::Deref;

use image::{ImageBuffer, Luma, Primitive};

use crate::errors::{shape_error, Result};

pub trait SampleGrid {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn depth(&self) -> usize;

    /// Intensity at `(x, y, z)`. Callers stay inside `[0,width) x [0,height) x [0,depth)`.
    fn get(&self, x: usize, y: usize, z: usize) -> f64;

    fn dims(&self) -> [usize; 3] {
        [self.width(), self.height(), self.depth()]
    }

    /// true if any axis has zero extent
    fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0 || self.depth() == 0
    }

    fn is_planar(&self) -> bool {
        self.depth() == 1
    }
}

impl<G: SampleGrid + ?Sized> SampleGrid for &G {
    fn width(&self) -> usize {
        (**self).width()
    }

    fn height(&self) -> usize {
        (**self).height()
    }

    fn depth(&self) -> usize {
        (**self).depth()
    }

    fn get(&self, x: usize, y: usize, z: usize) -> f64 {
        (**self).get(x, y, z)
    }
}

/// Owned samples on a regular `[nx, ny, nz]` grid, x varying fastest:
/// `index = z * nx * ny + y * nx + x`
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeGrid {
    shape: [usize; 3],
    data: Vec<f64>,
}

impl VolumeGrid {
    pub fn new(shape: [usize; 3], data: Vec<f64>) -> Result<Self> {
        let total = shape.iter().try_fold(1usize, |n, &d| n.checked_mul(d));
        let Some(total) = total else {
            return Err(shape_error(format!("shape {shape:?} is too large")));
        };
        if data.len() != total {
            let found = data.len();
            let msg = format!("shape {shape:?} needs {total} samples, got {found}");
            return Err(shape_error(msg));
        }
        Ok(VolumeGrid { shape, data })
    }

    /// Builds a grid by evaluating `f(x, y, z)` for every sample.
    pub fn from_fn(shape: [usize; 3], mut f: impl FnMut(usize, usize, usize) -> f64) -> Self {
        let [nx, ny, nz] = shape;
        let mut data = Vec::with_capacity(nx * ny * nz);
        for z in 0..nz {
            for y in 0..ny {
                for x in 0..nx {
                    data.push(f(x, y, z));
                }
            }
        }
        VolumeGrid { shape, data }
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }
}

impl SampleGrid for VolumeGrid {
    fn width(&self) -> usize {
        self.shape[0]
    }

    fn height(&self) -> usize {
        self.shape[1]
    }

    fn depth(&self) -> usize {
        self.shape[2]
    }

    fn get(&self, x: usize, y: usize, z: usize) -> f64 {
        let [nx, ny, _] = self.shape;
        self.data[z * nx * ny + y * nx + x]
    }
}

impl<P, C> SampleGrid for ImageBuffer<Luma<P>, C>
where
    P: Primitive + Into<f64> + 'static,
    C: Deref<Target = [P]>,
{
    fn width(&self) -> usize {
        self.dimensions().0 as usize
    }

    fn height(&self) -> usize {
        self.dimensions().1 as usize
    }

    fn depth(&self) -> usize {
        1
    }

    fn get(&self, x: usize, y: usize, _z: usize) -> f64 {
        let Luma([value]) = *self.get_pixel(x as u32, y as u32);
        value.into()
    }
}

/// Equally sized grey slices stacked along z.
#[derive(Debug, Clone)]
pub struct ImageStack<P: Primitive + 'static> {
    width: usize,
    height: usize,
    slices: Vec<ImageBuffer<Luma<P>, Vec<P>>>,
}

impl<P> ImageStack<P>
where
    P: Primitive + Into<f64> + 'static,
{
    pub fn new(slices: Vec<ImageBuffer<Luma<P>, Vec<P>>>) -> Result<Self> {
        let (width, height) = slices.first().map(|s| s.dimensions()).unwrap_or((0, 0));
        let mismatch = slices
            .iter()
            .enumerate()
            .find(|(_, s)| s.dimensions() != (width, height));
        if let Some((z, s)) = mismatch {
            let (w, h) = s.dimensions();
            let msg = format!("slice {z} is {w}x{h} but the stack is {width}x{height}");
            return Err(shape_error(msg));
        }
        Ok(ImageStack {
            width: width as usize,
            height: height as usize,
            slices,
        })
    }
}

impl<P> SampleGrid for ImageStack<P>
where
    P: Primitive + Into<f64> + 'static,
{
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn depth(&self) -> usize {
        self.slices.len()
    }

    fn get(&self, x: usize, y: usize, z: usize) -> f64 {
        SampleGrid::get(&self.slices[z], x, y, 0)
    }
}

/// One z-slice of a grid, seen as a 2D grid.
#[derive(Debug, Clone, Copy)]
pub struct SliceView<'a, G: ?Sized> {
    grid: &'a G,
    z: usize,
}

impl<'a, G: SampleGrid + ?Sized> SliceView<'a, G> {
    pub fn new(grid: &'a G, z: usize) -> Result<Self> {
        let depth = grid.depth();
        if z >= depth {
            return Err(shape_error(format!("slice {z} out of depth {depth}")));
        }
        Ok(SliceView { grid, z })
    }
}

impl<G: SampleGrid + ?Sized> SampleGrid for SliceView<'_, G> {
    fn width(&self) -> usize {
        self.grid.width()
    }

    fn height(&self) -> usize {
        self.grid.height()
    }

    fn depth(&self) -> usize {
        1
    }

    fn get(&self, x: usize, y: usize, _z: usize) -> f64 {
        self.grid.get(x, y, self.z)
    }
}
