//! Hit testing for the view cube widget: which face, edge or corner of the
//! projected cube lies under a screen position.

use cgmath::InnerSpace;

use tandem_geometry::{Quat, Vec3};

use crate::ui::{Point2, Rect, pos2, vec2};
use crate::viewcube::{ViewFace, ViewTarget};

#[derive(Clone, Copy, Debug)]
pub struct ViewPick {
    pub target: ViewTarget,
    pub normal: Vec3,
}

const PICK_INSET: f64 = 0.85;
// Distance from the centre of the unit cube to a corner.
const PICK_RADIUS: f64 = 0.866_025_403_784_438_6;
const SIGN_EPS: f64 = 1.0e-9;

/// Square the widget occupies in the top-right corner of the viewport.
pub fn widget_rect(viewport: Rect) -> Rect {
    let size = (viewport.width().min(viewport.height()) * 0.22).clamp(70.0, 120.0);
    let padding = 12.0;
    Rect::from_min_size(
        pos2(viewport.right() - padding - size, viewport.top() + padding),
        vec2(size, size),
    )
}

/// Corners win over edges, edges over faces.
pub fn pick_target(pos: Point2, viewport: Rect, cube_orientation: Quat) -> Option<ViewPick> {
    let rect = widget_rect(viewport);
    if !rect.contains(pos) {
        return None;
    }
    let projected = project_cube(rect, cube_orientation);
    let cube = cube_vertices();

    if let Some(corner_idx) = pick_corner(pos, rect, &projected) {
        let normal = cube[corner_idx].normalize();
        return target_from_normal(normal).map(|target| ViewPick { target, normal });
    }

    if let Some(edge_idx) = pick_edge(pos, rect, &projected) {
        let (a, b) = EDGE_DEFS[edge_idx];
        let normal = ((cube[a] + cube[b]) * 0.5).normalize();
        return target_from_normal(normal).map(|target| ViewPick { target, normal });
    }

    let faces = visible_faces(&projected, cube_orientation);
    pick_face(pos, &faces).map(|face| ViewPick {
        target: ViewTarget::Face(face),
        normal: face.normal(),
    })
}

fn target_from_normal(normal: Vec3) -> Option<ViewTarget> {
    ViewTarget::from_signs(sign(normal.x), sign(normal.y), sign(normal.z))
}

fn sign(value: f64) -> i8 {
    if value > SIGN_EPS {
        1
    } else if value < -SIGN_EPS {
        -1
    } else {
        0
    }
}

fn visible_faces(projected: &ProjectedCube, cube_orientation: Quat) -> Vec<ProjectedFace> {
    let mut faces = Vec::new();
    for def in FACE_DEFS {
        let facing = (cube_orientation * def.face.normal()).z;
        if facing <= 0.0 {
            continue;
        }
        let mut points = [Point2::default(); 4];
        let mut depth = 0.0;
        for (i, idx) in def.indices.iter().enumerate() {
            depth += projected.view[*idx].z;
            points[i] = projected.points[*idx];
        }
        faces.push(ProjectedFace {
            face: def.face,
            points,
            depth: depth / 4.0,
        });
    }
    faces
}

fn pick_face(pos: Point2, faces: &[ProjectedFace]) -> Option<ViewFace> {
    let mut best: Option<(f64, ViewFace)> = None;
    for face in faces {
        if point_in_quad(pos, face.points) {
            match best {
                Some((depth, _)) if face.depth <= depth => {}
                _ => best = Some((face.depth, face.face)),
            }
        }
    }
    best.map(|(_, face)| face)
}

fn pick_corner(pos: Point2, rect: Rect, projected: &ProjectedCube) -> Option<usize> {
    let size = rect.width().min(rect.height());
    let radius = (size * 0.1).clamp(7.0, 12.0);
    let candidates = projected
        .points
        .iter()
        .enumerate()
        .map(|(idx, point)| (idx, pos.distance(*point), projected.view[idx].z));
    nearest_in_front(candidates, radius)
}

fn pick_edge(pos: Point2, rect: Rect, projected: &ProjectedCube) -> Option<usize> {
    let size = rect.width().min(rect.height());
    let threshold = (size * 0.06).clamp(6.0, 9.0);
    let candidates = EDGE_DEFS.iter().enumerate().map(|(idx, (a, b))| {
        let dist = point_to_segment_distance(pos, projected.points[*a], projected.points[*b]);
        let depth = (projected.view[*a].z + projected.view[*b].z) * 0.5;
        (idx, dist, depth)
    });
    nearest_in_front(candidates, threshold)
}

/// Closest candidate within `limit` on the near half of the cube; near
/// ties (within 0.1 px) go to the one closer to the viewer.
fn nearest_in_front<I>(candidates: I, limit: f64) -> Option<usize>
where
    I: Iterator<Item = (usize, f64, f64)>,
{
    let mut best: Option<(usize, f64, f64)> = None;
    for (idx, dist, depth) in candidates {
        if dist > limit || depth <= 0.0 {
            continue;
        }
        match best {
            Some((_, best_dist, best_depth)) => {
                if dist < best_dist - 0.1
                    || ((dist - best_dist).abs() <= 0.1 && depth > best_depth)
                {
                    best = Some((idx, dist, depth));
                }
            }
            None => best = Some((idx, dist, depth)),
        }
    }
    best.map(|(idx, _, _)| idx)
}

fn point_in_triangle(p: Point2, a: Point2, b: Point2, c: Point2) -> bool {
    let cross = |u: Point2, v: Point2| {
        let uv = v - u;
        let up = p - u;
        uv.x * up.y - uv.y * up.x
    };
    let d1 = cross(a, b);
    let d2 = cross(b, c);
    let d3 = cross(c, a);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

fn point_in_quad(p: Point2, quad: [Point2; 4]) -> bool {
    point_in_triangle(p, quad[0], quad[1], quad[2])
        || point_in_triangle(p, quad[0], quad[2], quad[3])
}

fn point_to_segment_distance(p: Point2, a: Point2, b: Point2) -> f64 {
    let ab = b - a;
    let ap = p - a;
    let denom = ab.dot(ab).max(1.0e-6);
    let t = (ap.dot(ab) / denom).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

fn cube_vertices() -> [Vec3; 8] {
    [
        Vec3::new(-0.5, -0.5, -0.5),
        Vec3::new(0.5, -0.5, -0.5),
        Vec3::new(0.5, 0.5, -0.5),
        Vec3::new(-0.5, 0.5, -0.5),
        Vec3::new(-0.5, -0.5, 0.5),
        Vec3::new(0.5, -0.5, 0.5),
        Vec3::new(0.5, 0.5, 0.5),
        Vec3::new(-0.5, 0.5, 0.5),
    ]
}

/// Cube vertices in widget space: x right, y up, z toward the viewer.
fn project_cube(rect: Rect, cube_orientation: Quat) -> ProjectedCube {
    let center = rect.center();
    let scale = rect.width().min(rect.height()) * 0.5 * PICK_INSET / PICK_RADIUS;
    let mut view = [Vec3::new(0.0, 0.0, 0.0); 8];
    let mut points = [Point2::default(); 8];
    for (idx, v) in cube_vertices().iter().enumerate() {
        let local = cube_orientation * *v;
        view[idx] = local;
        points[idx] = pos2(center.x + local.x * scale, center.y - local.y * scale);
    }
    ProjectedCube { view, points }
}

const EDGE_DEFS: [(usize, usize); 12] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 0),
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

const FACE_DEFS: [FaceDef; 6] = [
    FaceDef {
        face: ViewFace::Front,
        indices: [4, 5, 6, 7],
    },
    FaceDef {
        face: ViewFace::Back,
        indices: [0, 1, 2, 3],
    },
    FaceDef {
        face: ViewFace::Right,
        indices: [1, 2, 6, 5],
    },
    FaceDef {
        face: ViewFace::Left,
        indices: [0, 3, 7, 4],
    },
    FaceDef {
        face: ViewFace::Top,
        indices: [3, 2, 6, 7],
    },
    FaceDef {
        face: ViewFace::Bottom,
        indices: [0, 1, 5, 4],
    },
];

struct FaceDef {
    face: ViewFace,
    indices: [usize; 4],
}

struct ProjectedFace {
    face: ViewFace,
    points: [Point2; 4],
    depth: f64,
}

struct ProjectedCube {
    view: [Vec3; 8],
    points: [Point2; 8],
}
