// ============================================================================
// 嵌入式环境使用 embedded-alloc，任务入口 (Arc) 需要堆
// ============================================================================

#[cfg(feature = "embedded-alloc")]
mod embedded_heap {
    use crate::config::HEAP_SIZE;
    use core::mem::MaybeUninit;
    use embedded_alloc::Heap;
    use spin::Once;

    #[repr(align(8))]
    struct HeapStorage([MaybeUninit<u8>; HEAP_SIZE]);

    static mut HEAP_MEM: HeapStorage = HeapStorage([MaybeUninit::uninit(); HEAP_SIZE]);

    #[global_allocator]
    static HEAP: Heap = Heap::empty();

    static HEAP_INIT: Once<()> = Once::new();

    pub fn init_heap() {
        HEAP_INIT.call_once(|| {
            // SAFETY: 只初始化一次，HEAP_MEM 之后只由分配器访问
            unsafe {
                let heap_start = core::ptr::addr_of_mut!(HEAP_MEM).cast::<u8>() as usize;
                HEAP.init(heap_start, HEAP_SIZE);
            }
        });
    }
}

#[cfg(feature = "embedded-alloc")]
pub fn init_heap() {
    embedded_heap::init_heap();
}

// 测试/主机使用标准库分配器，无需初始化
#[cfg(not(feature = "embedded-alloc"))]
pub fn init_heap() {}
