use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::io::{Cursor, Write};
use threemf_import::materials::{MaterialBuilder, MaterialTables};
use threemf_import::{
    ColorGroup, ImportConfig, MemoryScene, MeshResource, PropertyId, ResourceId, Triangle,
    TriangleProperties, Vertex, import_from_reader, translate_mesh,
};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Build a grid mesh where every triangle references one of `colors` color entries
fn colored_grid(vertices: usize, triangles: usize, colors: usize) -> (MeshResource, ColorGroup) {
    let mut mesh = MeshResource::new(ResourceId(1));
    mesh.vertices = (0..vertices)
        .map(|i| Vertex::new((i % 100) as f64, (i / 100) as f64, 0.0))
        .collect();
    mesh.triangles = (0..triangles)
        .map(|i| {
            let base = (i * 3) % vertices.saturating_sub(2);
            Triangle::new(base, base + 1, base + 2)
        })
        .collect();
    mesh.properties = (0..triangles)
        .map(|i| {
            Some(TriangleProperties::uniform(
                ResourceId(2),
                PropertyId(i % colors),
            ))
        })
        .collect();

    let mut group = ColorGroup::new(ResourceId(2));
    group.colors = (0..colors)
        .map(|i| ((i * 37 % 256) as u8, (i * 91 % 256) as u8, 128, 255))
        .collect();

    (mesh, group)
}

/// Generate a 3MF package with a specified number of vertices and triangles
fn generate_3mf(vertices: usize, triangles: usize) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    let content_types = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="model" ContentType="application/vnd.ms-package.3dmanufacturing-3dmodel+xml"/>
</Types>"#;

    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(content_types.as_bytes()).unwrap();

    let rels = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rel0" Target="/3D/3dmodel.model" Type="http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel"/>
</Relationships>"#;

    zip.start_file("_rels/.rels", options).unwrap();
    zip.write_all(rels.as_bytes()).unwrap();

    let mut model_xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<model unit="millimeter" xml:lang="en-US" xmlns="http://schemas.microsoft.com/3dmanufacturing/core/2015/02">
    <resources>
        <object id="1" type="model">
            <mesh>
                <vertices>
"#,
    );

    for i in 0..vertices {
        model_xml.push_str(&format!(
            "                    <vertex x=\"{}\" y=\"{}\" z=\"0\"/>\n",
            i % 100,
            i / 100
        ));
    }

    model_xml.push_str("                </vertices>\n                <triangles>\n");

    for i in 0..triangles {
        let base = (i * 3) % vertices.saturating_sub(2);
        model_xml.push_str(&format!(
            "                    <triangle v1=\"{}\" v2=\"{}\" v3=\"{}\"/>\n",
            base,
            base + 1,
            base + 2
        ));
    }

    model_xml.push_str(
        r#"                </triangles>
            </mesh>
        </object>
    </resources>
    <build>
        <item objectid="1"/>
    </build>
</model>"#,
    );

    zip.start_file("3D/3dmodel.model", options).unwrap();
    zip.write_all(model_xml.as_bytes()).unwrap();

    zip.finish().unwrap().into_inner()
}

fn bench_translate(c: &mut Criterion) {
    let mut group = c.benchmark_group("translate_mesh");

    for &(vertices, triangles) in &[(1000, 500), (10000, 5000), (100000, 50000)] {
        let (mesh, colors) = colored_grid(vertices, triangles, 16);
        let builder = MaterialBuilder::new();
        let tables = MaterialTables::new(
            builder.build_color_materials([&colors]),
            Default::default(),
        );

        group.bench_with_input(
            BenchmarkId::new(
                "vertices_triangles",
                format!("{}v_{}t", vertices, triangles),
            ),
            &mesh,
            |b, mesh| {
                b.iter(|| black_box(translate_mesh(mesh, &tables).unwrap()));
            },
        );
    }

    group.finish();
}

fn bench_import(c: &mut Criterion) {
    let mut group = c.benchmark_group("import");
    group.sample_size(10);

    for &(vertices, triangles) in &[(1000, 500), (50000, 25000)] {
        let bytes = generate_3mf(vertices, triangles);

        group.bench_with_input(
            BenchmarkId::new(
                "vertices_triangles",
                format!("{}v_{}t", vertices, triangles),
            ),
            &bytes,
            |b, bytes| {
                b.iter(|| {
                    let mut scene = MemoryScene::new();
                    let summary = import_from_reader(
                        Cursor::new(bytes.as_slice()),
                        &mut scene,
                        &ImportConfig::default(),
                    )
                    .unwrap();
                    black_box((summary, scene))
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_translate, bench_import);
criterion_main!(benches);
