//! Descriptor family of the dispatcher: set allocation, updates with
//! overflow carry, copies and pool-level teardown.

use ash::vk;

use crate::builder::FootprintBuilder;
use crate::graph::behavior::{BehaviorIndex, CommandId};
use crate::graph::emitter::Emitter;
use crate::graph::variable::Var;
use crate::state::{DescriptorBindingState, DescriptorSetState, DescriptorSlot};
use crate::trace::command::{DescriptorContents, DescriptorCopy, DescriptorWrite};
use crate::trace::snapshot::TraceContext;

fn is_dynamic(ty: vk::DescriptorType) -> bool {
    ty == vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC
        || ty == vk::DescriptorType::STORAGE_BUFFER_DYNAMIC
}

impl FootprintBuilder {
    pub(crate) fn allocate_descriptor_sets(
        &mut self,
        ctx: &dyn TraceContext,
        id: CommandId,
        pool: vk::DescriptorPool,
        layouts: &[vk::DescriptorSetLayout],
        sets: &[vk::DescriptorSet],
    ) {
        let behavior = self.behavior(id);
        for (&set, &layout) in sets.iter().zip(layouts) {
            let Some(info) = ctx.descriptor_set_layout(layout) else {
                warn!("unknown descriptor set layout {layout:?}");
                continue;
            };
            let mut state = DescriptorSetState::default();
            let mut vars = vec![Var::handle(set)];
            for binding in &info.bindings {
                let slots = (0..binding.count)
                    .map(|_| {
                        let var = self.table.new_descriptor();
                        vars.push(Var::Id(var));
                        DescriptorSlot {
                            var,
                            contents: None,
                        }
                    })
                    .collect();
                if is_dynamic(binding.ty) {
                    state.dynamic_count += binding.count as usize;
                }
                state.bindings.insert(
                    binding.binding,
                    DescriptorBindingState {
                        ty: binding.ty,
                        slots,
                    },
                );
            }
            self.state.descriptor_sets.insert(set, state);
            self.state
                .descriptor_pool_sets
                .entry(pool)
                .or_default()
                .push(set);
            Emitter::new(&mut self.table, &mut self.footprint, self.debug).write(behavior, &vars);
        }
    }

    pub(crate) fn free_descriptor_sets(
        &mut self,
        id: CommandId,
        pool: vk::DescriptorPool,
        sets: &[vk::DescriptorSet],
    ) {
        for set in sets {
            self.state.descriptor_sets.remove(set);
        }
        if let Some(allocated) = self.state.descriptor_pool_sets.get_mut(&pool) {
            allocated.retain(|s| !sets.contains(s));
        }
        let handles: Vec<Var> = sets.iter().map(|s| Var::handle(*s)).collect();
        self.stamp_destroy(id, &handles);
    }

    pub(crate) fn destroy_descriptor_pool(&mut self, id: CommandId, pool: vk::DescriptorPool) {
        self.drop_pool_sets(pool);
        self.stamp_destroy(id, &[Var::handle(pool)]);
    }

    pub(crate) fn reset_descriptor_pool(&mut self, id: CommandId, pool: vk::DescriptorPool) {
        self.drop_pool_sets(pool);
        self.stamp_destroy(id, &[Var::handle(pool)]);
    }

    fn drop_pool_sets(&mut self, pool: vk::DescriptorPool) {
        for set in self
            .state
            .descriptor_pool_sets
            .remove(&pool)
            .unwrap_or_default()
        {
            self.state.descriptor_sets.remove(&set);
        }
    }

    pub(crate) fn update_descriptor_sets(
        &mut self,
        id: CommandId,
        writes: &[DescriptorWrite],
        copies: &[DescriptorCopy],
    ) {
        let behavior = self.behavior(id);
        for write in writes {
            self.apply_descriptor_write(behavior, write);
        }
        for copy in copies {
            self.apply_descriptor_copy(behavior, copy);
        }
    }

    /// Apply one descriptor write, carrying `DstBinding` to the next binding
    /// (and resetting `DstArrayElement` to zero) whenever the element count
    /// exceeds the current binding's remaining slots.
    fn apply_descriptor_write(&mut self, behavior: BehaviorIndex, write: &DescriptorWrite) {
        let mut emitter = Emitter::new(&mut self.table, &mut self.footprint, self.debug);
        emitter.read(behavior, &[Var::handle(write.set)]);
        let Some(set_state) = self.state.descriptor_sets.get_mut(&write.set) else {
            warn!("update of unknown descriptor set {:?}", write.set);
            return;
        };
        let mut binding = write.binding;
        let mut index = write.array_element as usize;
        for element in &write.elements {
            let slot = loop {
                let Some(binding_state) = set_state.bindings.get_mut(&binding) else {
                    warn!(
                        "descriptor write overflow past last binding of {:?}",
                        write.set
                    );
                    return;
                };
                if index < binding_state.slots.len() {
                    break &mut binding_state.slots[index];
                }
                binding += 1;
                index = 0;
            };
            slot.contents = Some(*element);
            emitter.write(behavior, &[Var::Id(slot.var)]);
            index += 1;
        }
    }

    /// Apply one descriptor copy, with parallel overflow carry on the source
    /// and destination sides.
    fn apply_descriptor_copy(&mut self, behavior: BehaviorIndex, copy: &DescriptorCopy) {
        let Some(src_state) = self.state.descriptor_sets.get(&copy.src_set) else {
            warn!("copy from unknown descriptor set {:?}", copy.src_set);
            return;
        };
        // Walk the source side first, collecting (variable, contents).
        let mut source: Vec<(Var, Option<DescriptorContents>)> = Vec::new();
        let mut binding = copy.src_binding;
        let mut index = copy.src_array_element as usize;
        for _ in 0..copy.count {
            let slot = loop {
                let Some(binding_state) = src_state.bindings.get(&binding) else {
                    warn!(
                        "descriptor copy overflow past last binding of {:?}",
                        copy.src_set
                    );
                    return;
                };
                if index < binding_state.slots.len() {
                    break &binding_state.slots[index];
                }
                binding += 1;
                index = 0;
            };
            source.push((Var::Id(slot.var), slot.contents));
            index += 1;
        }

        let mut emitter = Emitter::new(&mut self.table, &mut self.footprint, self.debug);
        emitter.read(behavior, &[Var::handle(copy.src_set)]);
        let source_vars: Vec<Var> = source.iter().map(|(var, _)| *var).collect();
        emitter.read(behavior, &source_vars);

        let Some(dst_state) = self.state.descriptor_sets.get_mut(&copy.dst_set) else {
            warn!("copy to unknown descriptor set {:?}", copy.dst_set);
            return;
        };
        let mut binding = copy.dst_binding;
        let mut index = copy.dst_array_element as usize;
        for (_, contents) in source {
            let slot = loop {
                let Some(binding_state) = dst_state.bindings.get_mut(&binding) else {
                    warn!(
                        "descriptor copy overflow past last binding of {:?}",
                        copy.dst_set
                    );
                    return;
                };
                if index < binding_state.slots.len() {
                    break &mut binding_state.slots[index];
                }
                binding += 1;
                index = 0;
            };
            slot.contents = contents;
            emitter.write(behavior, &[Var::Id(slot.var)]);
            index += 1;
        }
    }
}
