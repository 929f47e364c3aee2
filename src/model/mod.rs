//! Data structures representing the 3MF resource graph

mod core;
mod material;

pub use core::{
    BuildItem, Component, ComponentsResource, MeshResource, Model, ObjectResource, PropertyId,
    ResourceId, Resources, Triangle, TriangleProperties, Vertex,
};

pub use material::{
    BaseMaterial, BaseMaterialGroup, ColorGroup, Rgba, Tex2Coord, Texture2D, Texture2DGroup,
    TextureAttachment,
};
