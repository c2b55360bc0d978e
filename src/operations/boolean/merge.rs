use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::{OperationError, Result};
use crate::math::polygon_3d::{point_segment_distance, vector_area};
use crate::math::{ToleranceConfig, Vector3};
use crate::topology::{loop_edges, Shell, VertexId};

/// Merges adjacent coplanar faces of a shell.
///
/// Groups faces that share the same oriented plane, finds connected
/// components (faces sharing an edge), and replaces each component by a
/// single face whose loops are the component's boundary. The merged face
/// takes the place and name of the component's lowest-index face.
///
/// # Errors
///
/// Returns [`OperationError::Failed`] if a component's boundary does not
/// chain into closed loops.
pub fn merge_coplanar_faces(shell: &mut Shell, tolerance: &ToleranceConfig) -> Result<()> {
    let groups = group_coplanar(shell, tolerance);

    let mut consumed: Vec<usize> = Vec::new();
    for group in &groups {
        if group.len() < 2 {
            continue;
        }
        for component in find_connected_components(shell, group) {
            if component.len() < 2 {
                continue;
            }
            merge_component(shell, &component)?;
            consumed.extend_from_slice(&component[1..]);
        }
    }

    if !consumed.is_empty() {
        shell.remove_faces(&consumed);
        shell.purge_unused_vertices();
    }
    Ok(())
}

/// Removes vertices that only two faces meet at and that lie on the
/// straight line through their loop neighbours, joining the two edges.
///
/// # Errors
///
/// Returns an error if a face references an unknown vertex.
pub fn merge_collinear_edges(shell: &mut Shell, tolerance: &ToleranceConfig) -> Result<()> {
    let candidates: Vec<VertexId> = shell.vertices().map(|(id, _)| id).collect();
    for vertex in candidates {
        let faces = shell.vertex_faces(vertex);
        if faces.len() != 2 || !is_removable(shell, vertex, &faces, tolerance)? {
            continue;
        }
        for &index in &faces {
            let face = shell.face_mut(index)?;
            for lp in face.loops_mut() {
                lp.retain(|&v| v != vertex);
            }
        }
    }
    shell.purge_unused_vertices();
    Ok(())
}

fn is_removable(
    shell: &Shell,
    vertex: VertexId,
    faces: &[usize],
    tolerance: &ToleranceConfig,
) -> Result<bool> {
    let point = shell.point(vertex)?;
    for &index in faces {
        for lp in shell.face(index)?.loops() {
            let Some(at) = lp.iter().position(|&v| v == vertex) else {
                continue;
            };
            if lp.len() <= 3 {
                return Ok(false);
            }
            let prev = shell.point(lp[(at + lp.len() - 1) % lp.len()])?;
            let next = shell.point(lp[(at + 1) % lp.len()])?;
            if point_segment_distance(&point, &prev, &next) > tolerance.metric {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

/// Groups face indices by coplanarity (same oriented plane).
fn group_coplanar(shell: &Shell, tolerance: &ToleranceConfig) -> Vec<Vec<usize>> {
    let faces = shell.faces();
    let n = faces.len();
    let mut visited = vec![false; n];
    let mut groups: Vec<Vec<usize>> = Vec::new();

    for i in 0..n {
        if visited[i] {
            continue;
        }
        visited[i] = true;
        let mut group = vec![i];

        for j in (i + 1)..n {
            if visited[j] {
                continue;
            }
            if faces[i]
                .plane
                .is_same(&faces[j].plane, tolerance.metric, tolerance.angle)
            {
                visited[j] = true;
                group.push(j);
            }
        }

        groups.push(group);
    }

    groups
}

/// Finds connected components within a group of coplanar faces.
///
/// Two faces are adjacent if one has directed edge (A→B) and the other has (B→A).
fn find_connected_components(shell: &Shell, group: &[usize]) -> Vec<Vec<usize>> {
    let n = group.len();

    let mut edge_to_face: HashMap<(VertexId, VertexId), usize> = HashMap::new();
    for (local, &global) in group.iter().enumerate() {
        for lp in shell.faces()[global].loops() {
            for key in loop_edges(lp) {
                edge_to_face.insert(key, local);
            }
        }
    }

    let mut adj: Vec<HashSet<usize>> = vec![HashSet::new(); n];
    for (local, &global) in group.iter().enumerate() {
        for lp in shell.faces()[global].loops() {
            for (a, b) in loop_edges(lp) {
                if let Some(&neighbor) = edge_to_face.get(&(b, a)) {
                    if neighbor != local {
                        adj[local].insert(neighbor);
                        adj[neighbor].insert(local);
                    }
                }
            }
        }
    }

    // BFS to find connected components
    let mut visited = vec![false; n];
    let mut components: Vec<Vec<usize>> = Vec::new();

    for start in 0..n {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        let mut component = vec![group[start]];
        let mut queue = VecDeque::new();
        queue.push_back(start);

        while let Some(curr) = queue.pop_front() {
            let mut neighbors: Vec<usize> = adj[curr].iter().copied().collect();
            neighbors.sort_unstable();
            for neighbor in neighbors {
                if !visited[neighbor] {
                    visited[neighbor] = true;
                    component.push(group[neighbor]);
                    queue.push_back(neighbor);
                }
            }
        }

        component.sort_unstable();
        components.push(component);
    }

    components
}

/// Rewrites the first face of a component so that it covers the whole
/// component. The other faces are left for the caller to remove.
fn merge_component(shell: &mut Shell, component: &[usize]) -> Result<()> {
    let mut directed: Vec<(VertexId, VertexId)> = Vec::new();
    for &index in component {
        for lp in shell.face(index)?.loops() {
            directed.extend(loop_edges(lp));
        }
    }

    // Boundary edges: those whose reverse does NOT appear
    let all: HashSet<(VertexId, VertexId)> = directed.iter().copied().collect();
    let boundary: Vec<(VertexId, VertexId)> = directed
        .into_iter()
        .filter(|&(a, b)| !all.contains(&(b, a)))
        .collect();

    if boundary.is_empty() {
        return Err(OperationError::Failed("merge produced no boundary edges".into()).into());
    }

    let loops = chain_into_loops(&boundary)?;
    let normal = *shell.face(component[0])?.normal();
    let (outer, inner) = classify_loops(shell, loops, &normal)?;

    let face = shell.face_mut(component[0])?;
    face.outer_loop = outer;
    face.inner_loops = inner;
    Ok(())
}

/// Chains directed boundary edges into closed loops.
fn chain_into_loops(edges: &[(VertexId, VertexId)]) -> Result<Vec<Vec<VertexId>>> {
    let mut start_map: HashMap<VertexId, Vec<usize>> = HashMap::new();
    for (i, &(start, _)) in edges.iter().enumerate() {
        start_map.entry(start).or_default().push(i);
    }

    let mut used = vec![false; edges.len()];
    let mut loops: Vec<Vec<VertexId>> = Vec::new();

    for seed in 0..edges.len() {
        if used[seed] {
            continue;
        }
        used[seed] = true;
        let (first, mut current) = edges[seed];
        let mut chain = vec![first];

        while current != first {
            chain.push(current);
            let next = start_map
                .get(&current)
                .and_then(|candidates| candidates.iter().find(|&&idx| !used[idx]).copied())
                .ok_or_else(|| {
                    OperationError::Failed("boundary edges do not form a closed loop".into())
                })?;
            used[next] = true;
            current = edges[next].1;
        }

        if chain.len() >= 3 {
            loops.push(chain);
        }
    }

    Ok(loops)
}

/// Classifies loops into outer boundary (largest area) and inner holes.
fn classify_loops(
    shell: &Shell,
    mut loops: Vec<Vec<VertexId>>,
    normal: &Vector3,
) -> Result<(Vec<VertexId>, Vec<Vec<VertexId>>)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, lp) in loops.iter().enumerate() {
        let area = vector_area(&shell.loop_points(lp)?).dot(normal);
        if best.map_or(true, |(_, a)| area > a) {
            best = Some((i, area));
        }
    }
    let (outer_index, _) =
        best.ok_or_else(|| OperationError::Failed("no loops to classify".into()))?;
    let outer = loops.remove(outer_index);
    Ok((outer, loops))
}
